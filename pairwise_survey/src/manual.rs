/*!

This is the long-form manual for `pairwise_survey` and `pairwise`.

## How a survey runs

1. **Entry.** Five items are entered (the number is configurable). Blank
   entries are ignored and the others are trimmed. The survey only starts
   when exactly five non-empty items remain. If the survey collects emails, a
   valid address is also required.
2. **Survey.** Every unordered pair of items is asked once, in this order:

   ```text
   A-B, A-C, A-D, A-E, B-C, B-D, B-E, C-D, C-E, D-E
   ```

   For each pair, the preferred item gets one point.
3. **Results.** After the tenth answer, the tally is written to the store and
   the items are shown from most to least chosen. If the store cannot be
   written to, a message is shown but the results are still available.

Starting a new survey clears everything.

Duplicated items are accepted. They share the same score, so the tally has
fewer entries than items.

## Store format

The store is a CSV file with one row per completed survey. The header row is
written when the file is created:

```text
timestamp,email,item_1,item_2,item_3,item_4,item_5
2024-05-01T12:30:05,ana@example.com,"Health, 4","Family, 3","Work, 2","Sport, 1","Travel, 0"
```

- `timestamp` is in UTC with second precision.
- `email` is only present when emails are collected.
- the item columns follow the order in which the items were entered.

Two encodings are available for the item columns:
* `labelled` (default): `<item>, <count>`
* `raw`: the count alone

With `raw`, nothing in the row names the items: the header only says
`item_1`, `item_2`, ... and each respondent may enter different items. The
counts of a row can only be matched to items when every respondent ranks the
same items in the same order, for example items preset with `--items` or in
the configuration file. Keep `labelled` when the rows must stand on their own.

## Configuration

`pairwise` works without any configuration. A JSON configuration file can be
passed with `--config`:

```json
{
  "surveySettings": {
    "title": "What matters most?",
    "itemCount": 5,
    "collectEmail": true
  },
  "store": {
    "provider": "csv",
    "filePath": "responses.csv",
    "tallyEncoding": "labelled"
  },
  "items": ["Health", "Family", "Work", "Sport", "Travel"]
}
```

All the fields are optional. `filePath` is relative to the directory of the
configuration file. Options passed on the command line take precedence.

The `store.provider` field accepts:
* `csv`: the CSV file described above
* `memory`: nothing is written (same as `--dry-run`)

## Importing items

Items can be read from the first column of a CSV or Excel (.xlsx) file with
`--items-file`. An optional header cell named `item` is skipped. For Excel
files with several worksheets, the worksheet is chosen with
`--excel-worksheet-name`.

## Scripted runs

`--answers 1,2,1,...` answers the questions without prompting: `1` picks
the first item of the pair, `2` the second one. There must be one answer per
pair.

 */
